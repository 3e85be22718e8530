mod pages;
mod projects;
mod support;
