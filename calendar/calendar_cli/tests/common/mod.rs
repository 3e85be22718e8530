use std::fs::read_to_string;
use std::path::PathBuf;

use assert_cmd::assert::Assert;
use assert_cmd::Command;
use tempfile::{tempdir, TempDir};
use util::test::{build_temp_file, prepare_args, print};

/// A workspace in a temporary directory, deleted when dropped.
#[derive(Debug)]
pub struct Context {
    pub temp_dir: TempDir,

    pub path_arg: String,
    pub trace_log_arg: String,
    pub trace_log_path: PathBuf,
}

impl Context {
    pub fn new() -> Self {
        let temp_dir = tempdir().unwrap();

        let path_arg = format!("--path {}", temp_dir.path().to_str().unwrap());

        let (trace_log_path, _trace_log_file_name) = build_temp_file(&temp_dir, "trace", "log");
        let trace_log_arg = format!("--trace {}", trace_log_path.to_str().unwrap());

        Context {
            temp_dir,
            path_arg,
            trace_log_arg,
            trace_log_path,
        }
    }

    /// Run the command line in this workspace.
    pub fn run(&self, args: Vec<&str>) -> Assert {
        let mut cmd = Command::cargo_bin("calendar_cli").unwrap();

        let mut all_args = vec![self.trace_log_arg.as_str(), self.path_arg.as_str()];
        all_args.extend(args);
        let args = prepare_args(all_args);
        println!("args: {:?}", args);

        cmd.args(args)
            .assert()
            .stderr(print("stderr"))
            .stdout(print("stdout"))
    }

    /// Run a command line that must succeed and return its trimmed stdout.
    pub fn output(&self, args: Vec<&str>) -> String {
        let assert = self.run(args).success();
        String::from_utf8(assert.get_output().stdout.clone())
            .unwrap()
            .trim()
            .to_string()
    }

    pub fn trace_content(&self) -> String {
        read_to_string(&self.trace_log_path).unwrap()
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.temp_dir.path().join(name)
    }

    /// The local snapshot cache of the workspace.
    pub fn snapshot(&self) -> serde_json::Value {
        let content = read_to_string(self.path("snapshot.json")).unwrap();
        serde_json::from_str(&content).unwrap()
    }

    /// A table file of the workspace store.
    pub fn table(&self, name: &str) -> serde_json::Value {
        let content = read_to_string(self.path(&format!("store/{}.json", name))).unwrap();
        serde_json::from_str(&content).unwrap()
    }
}
