use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

pub const OWNER: &str = "ada@example.com";
pub const PARTNER: &str = "bob@example.com";
pub const QUESTION_COUNT: usize = 15;

/// An isolated home and data directory per test, so nothing touches the
/// real ~/.config/couplefin.
pub struct TestEnv {
    _tmp: TempDir,
    pub home: PathBuf,
    pub data_dir: PathBuf,
}

impl TestEnv {
    pub fn new() -> Self {
        let tmp = TempDir::new().expect("create temp dir");
        let home = tmp.path().join("home");
        fs::create_dir_all(&home).expect("create isolated home");
        let data_dir = tmp.path().join("data");

        Self {
            _tmp: tmp,
            home,
            data_dir,
        }
    }

    pub fn cmd(&self) -> Command {
        let mut cmd = cargo_bin_cmd!("couplefin");
        cmd.env("HOME", &self.home)
            .env_remove("RUST_LOG")
            .env_remove("COUPLEFIN_MAIL_TOKEN")
            .arg("--data-dir")
            .arg(&self.data_dir);
        cmd
    }

    /// Run as `user` and return stdout, asserting success
    pub fn run_as(&self, user: &str, args: &[&str]) -> String {
        let out = self
            .cmd()
            .args(["--user", user])
            .args(args)
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();
        String::from_utf8(out).expect("utf-8 stdout")
    }

    pub fn register(&self, email: &str) {
        self.cmd()
            .args(["user", "register", email])
            .assert()
            .success();
    }

    /// Register both users, start a session as the owner and join it as the
    /// partner. Returns the session id.
    pub fn paired_session(&self) -> String {
        self.register(OWNER);
        self.register(PARTNER);

        let out = self.run_as(OWNER, &["start"]);
        let id = session_id_from(&out);
        self.run_as(PARTNER, &["join", &id]);
        id
    }

    /// Answer every question with `value` and submit
    pub fn answer_all(&self, user: &str, session: &str, value: i32) {
        let mut args = vec!["answer".to_string(), session.to_string(), "--submit".to_string()];
        for n in 1..=QUESTION_COUNT {
            args.push("--set".to_string());
            args.push(format!("q{:02}={}", n, value));
        }
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        self.run_as(user, &args);
    }

    pub fn outbox_files(&self) -> Vec<PathBuf> {
        match fs::read_dir(self.data_dir.join("outbox")) {
            Ok(entries) => entries.filter_map(|e| e.ok()).map(|e| e.path()).collect(),
            Err(_) => Vec::new(),
        }
    }
}

/// Pull the id out of "Started session <id>"
pub fn session_id_from(start_output: &str) -> String {
    start_output
        .lines()
        .find_map(|line| line.strip_prefix("Started session "))
        .expect("start prints the session id")
        .trim()
        .to_string()
}
