use std::fs;

use anyhow::{anyhow, bail};
use calendar::layout::{raster_target, resolve_page, resolve_pages, RasterTarget, ResolvedPage};
use calendar::store::{CalendarStore, Dispatched, Event};
use clap::Parser;
use cli::args::SortOrderArg;
use stores::directory::to_pretty_json;
use stores::rows::EntityRef;
use stores::transfer::{export, import, ExportOptions};
use tracing::{info, trace};

use crate::opts::{Opts, Request};
use crate::workspace::Workspace;

mod opts;
mod workspace;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = argfile::expand_args(argfile::parse_fromfile, argfile::PREFIX)?;

    let opts = Opts::parse_from(args);

    cli::tracing::configure_tracing(opts.trace.clone(), opts.verbose.clone())?;

    let workspace = Workspace::open(&opts.path);
    let request = Request::try_from(opts.command)?;
    trace!("request: {:?}", request);

    let mut store = workspace.load().await?;

    match request {
        Request::Event(event) => apply(&workspace, &mut store, event).await?,
        Request::ListProjects => list_projects(&store),
        Request::ListAssets {
            sort,
        } => list_assets(&store, sort),
        Request::ListGroups => list_groups(&store),
        Request::Layout {
            page,
            dpi,
        } => print_layout(&store, page, dpi)?,
        Request::Export {
            output,
            redact_uploads,
            pretty,
        } => {
            let content = export(&store.snapshot(), &ExportOptions {
                redact_uploads,
                pretty,
            })?;
            match output {
                Some(path) => {
                    fs::write(&path, content)?;
                    info!("Exported workspace. path: {:?}", path);
                }
                None => print!("{}", content),
            }
        }
        Request::Import {
            input,
        } => {
            let content = fs::read_to_string(&input)?;
            let imported = CalendarStore::from_snapshot(import(&content)?);

            workspace
                .delete_missing(&store, &imported)
                .await;
            workspace.save(&imported).await?;
            info!("Imported workspace. path: {:?}", input);
        }
    }

    Ok(())
}

async fn apply(workspace: &Workspace, store: &mut CalendarStore, event: Event) -> anyhow::Result<()> {
    if let Event::SetActiveProject {
        id: Some(id),
    } = &event
    {
        if store.get_project_by_id(id).is_none() {
            bail!("Project not found. id: {}", id)
        }
    }

    let deleted = match &event {
        Event::DeleteProject {
            id,
        } => Some(EntityRef::Project(id.clone())),
        Event::DeleteAsset {
            id,
        } => Some(EntityRef::Asset(id.clone())),
        Event::DeleteGroup {
            id,
        } => Some(EntityRef::Group(id.clone())),
        _ => None,
    };

    let revision = store.revision();
    match store.dispatch(event)? {
        Dispatched::ProjectCreated(id) => println!("{}", id),
        Dispatched::AssetAdded(id) => println!("{}", id),
        Dispatched::GroupCreated(id) => println!("{}", id),
        Dispatched::Done | Dispatched::History(_) => {}
    }

    if let Some(entity) = deleted {
        workspace.delete(entity).await;
    }

    // Saving after any change is implicit for the CLI.
    if store.revision() != revision {
        workspace.save(store).await?;
    }

    Ok(())
}

fn list_projects(store: &CalendarStore) {
    for project in store.projects() {
        let marker = match store.active_project_id() == Some(&project.id) {
            true => "\t(active)",
            false => "",
        };
        println!("{}\t{}{}", project.id, project.title, marker);
    }
}

fn list_assets(store: &CalendarStore, sort: SortOrderArg) {
    let mut assets = store.assets().to_vec();
    sort.to_sort_order()
        .sort_by_key(&mut assets, |asset| asset.created_at);

    for asset in assets {
        println!("{}\t{}\t{}", asset.id, asset.name, asset.url);
    }
}

fn list_groups(store: &CalendarStore) {
    for group in store.groups() {
        println!("{}\t{}\t{}", group.id, group.name, group.image_ids.len());
    }
}

#[derive(Debug, serde::Serialize)]
struct LayoutReport {
    pages: Vec<ResolvedPage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    raster: Option<RasterTarget>,
}

fn print_layout(store: &CalendarStore, page: Option<usize>, dpi: Option<u32>) -> anyhow::Result<()> {
    let project = store
        .active_project()
        .ok_or_else(|| anyhow!("No active project"))?;

    let pages = match page {
        Some(index) => vec![
            resolve_page(project, store.assets(), index).ok_or_else(|| anyhow!("Page not found. index: {}", index))?,
        ],
        None => resolve_pages(project, store.assets()),
    };

    let report = LayoutReport {
        pages,
        raster: dpi.map(|dpi| raster_target(project, dpi as f64)),
    };

    let content = to_pretty_json(&report)?;
    print!("{}", String::from_utf8_lossy(&content));

    Ok(())
}
