//! Shared test fixtures: real git repositories under a tempdir, and a
//! capture for asserting on emitted log fields.

use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tempfile::TempDir;

use crate::git::{run_git, run_git_stdout, GitConfig};
use crate::types::PrNumber;

/// A throwaway upstream repository plus a mirror root to run against it.
///
/// Layout under the tempdir:
///
/// ```text
/// upstream/   bare repository standing in for the remote
/// work/       working clone used to manufacture commits
/// mirror/     root the service operates on (master mirror + submissions)
/// ```
pub struct UpstreamFixture {
    pub temp: TempDir,
    pub upstream: PathBuf,
    pub work: PathBuf,
    pub config: GitConfig,
}

impl UpstreamFixture {
    /// Builds an upstream with one commit on `master`.
    pub async fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let upstream = temp.path().join("upstream");
        let work = temp.path().join("work");
        let mirror = temp.path().join("mirror");

        let config = GitConfig {
            root: mirror,
            default_branch: "master".to_string(),
            command_timeout: Duration::from_secs(60),
        };

        std::fs::create_dir_all(&upstream).unwrap();
        run_git(&config, &upstream, &["init", "--bare"])
            .await
            .unwrap();

        std::fs::create_dir_all(&work).unwrap();
        run_git(&config, &work, &["init"]).await.unwrap();
        run_git(&config, &work, &["config", "user.email", "test@test.com"])
            .await
            .unwrap();
        run_git(&config, &work, &["config", "user.name", "Test"])
            .await
            .unwrap();
        // The local branch name depends on the git version; pin it.
        run_git(&config, &work, &["checkout", "-B", "master"])
            .await
            .unwrap();

        std::fs::write(work.join("README.md"), "# upstream\n").unwrap();
        run_git(&config, &work, &["add", "."]).await.unwrap();
        run_git(&config, &work, &["commit", "-m", "Initial commit"])
            .await
            .unwrap();

        let upstream_url = upstream.to_str().unwrap().to_string();
        run_git(&config, &work, &["remote", "add", "origin", &upstream_url])
            .await
            .unwrap();
        run_git(&config, &work, &["push", "origin", "HEAD:master"])
            .await
            .unwrap();
        run_git(
            &config,
            &upstream,
            &["symbolic-ref", "HEAD", "refs/heads/master"],
        )
        .await
        .unwrap();

        UpstreamFixture {
            temp,
            upstream,
            work,
            config,
        }
    }

    /// URL the mirror clones from (the upstream's filesystem path).
    pub fn remote_url(&self) -> String {
        self.upstream.to_str().unwrap().to_string()
    }

    /// Adds a commit to `master` and pushes it. Returns the new head SHA.
    pub async fn push_master_commit(&self, file: &str) -> String {
        run_git(&self.config, &self.work, &["checkout", "master"])
            .await
            .unwrap();
        std::fs::write(self.work.join(file), file).unwrap();
        run_git(&self.config, &self.work, &["add", "."]).await.unwrap();
        run_git(&self.config, &self.work, &["commit", "-m", file])
            .await
            .unwrap();
        run_git(&self.config, &self.work, &["push", "origin", "HEAD:master"])
            .await
            .unwrap();
        run_git_stdout(&self.config, &self.work, &["rev-parse", "HEAD"])
            .await
            .unwrap()
    }

    /// Publishes (or advances) a pull request head ref on the upstream.
    ///
    /// Branches off the current `master`, commits `file`, and force-pushes to
    /// `refs/pull/<number>/head`. Returns the new head SHA.
    pub async fn push_pr_head(&self, number: PrNumber, file: &str) -> String {
        run_git(&self.config, &self.work, &["checkout", "-B", "pr-work", "master"])
            .await
            .unwrap();
        std::fs::write(self.work.join(file), file).unwrap();
        run_git(&self.config, &self.work, &["add", "."]).await.unwrap();
        run_git(&self.config, &self.work, &["commit", "-m", file])
            .await
            .unwrap();
        let refspec = format!("+HEAD:refs/pull/{}/head", number);
        run_git(&self.config, &self.work, &["push", "origin", &refspec])
            .await
            .unwrap();
        let sha = run_git_stdout(&self.config, &self.work, &["rev-parse", "HEAD"])
            .await
            .unwrap();
        run_git(&self.config, &self.work, &["checkout", "master"])
            .await
            .unwrap();
        sha
    }

    /// Head SHA of a pull request ref as the upstream sees it.
    pub async fn upstream_pr_head(&self, number: PrNumber) -> String {
        let refname = format!("refs/pull/{}/head", number);
        run_git_stdout(&self.config, &self.upstream, &["rev-parse", &refname])
            .await
            .unwrap()
    }

    /// Head SHA checked out in the master mirror's working tree.
    pub async fn mirror_head(&self) -> String {
        run_git_stdout(&self.config, &self.config.root, &["rev-parse", "HEAD"])
            .await
            .unwrap()
    }

    /// Head SHA checked out in a submission checkout's working tree.
    pub async fn submission_head(&self, number: PrNumber) -> String {
        let path = self.config.submission_path(number);
        run_git_stdout(&self.config, &path, &["rev-parse", "HEAD"])
            .await
            .unwrap()
    }
}

/// Collects formatted tracing output so a test can assert on emitted fields.
///
/// Install via `tracing::subscriber::with_default` (or `WithSubscriber` on a
/// future) and read back with [`LogCapture::contents`].
#[derive(Clone, Default)]
pub struct LogCapture {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl LogCapture {
    /// A plain-text subscriber writing into this capture.
    pub fn subscriber(&self) -> impl tracing::Subscriber + Send + Sync + 'static {
        tracing_subscriber::fmt()
            .with_writer(self.clone())
            .with_ansi(false)
            .finish()
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buffer.lock().unwrap()).into_owned()
    }
}

impl io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for LogCapture {
    type Writer = LogCapture;

    fn make_writer(&'a self) -> LogCapture {
        self.clone()
    }
}
