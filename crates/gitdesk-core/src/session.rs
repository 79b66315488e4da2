//! Background execution of facade calls.
//!
//! A [`Session`] shares one [`Facade`] behind a mutex and runs each call on
//! tokio's blocking pool, so a front-end thread never waits on git. The
//! lock serializes calls against the binding; long network operations come
//! back as an [`Operation`] that can be cancelled while it runs.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use gitdesk_git::{CancelToken, Facade, StatusSnapshot};
use tokio::task::JoinHandle;

use crate::error::Result;

/// Shared handle to a facade, cheap to clone.
#[derive(Debug, Clone)]
pub struct Session {
    facade: Arc<Mutex<Facade>>,
}

impl Session {
    #[must_use]
    pub fn new(facade: Facade) -> Self {
        Self {
            facade: Arc::new(Mutex::new(facade)),
        }
    }

    /// Lock the facade on the current thread.
    ///
    /// A panic inside an earlier call does not make the facade unusable:
    /// every facade call leaves it in a valid state.
    pub fn lock(&self) -> MutexGuard<'_, Facade> {
        lock(&self.facade)
    }

    /// Run `f` with exclusive access to the facade on the blocking pool.
    ///
    /// # Errors
    /// Returns the facade error, or [`crate::Error::Worker`] if `f` panicked.
    pub async fn run<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Facade) -> gitdesk_git::Result<T> + Send + 'static,
    {
        let facade = Arc::clone(&self.facade);
        let result = tokio::task::spawn_blocking(move || f(&mut lock(&facade))).await?;
        Ok(result?)
    }

    /// Start a cancellable operation on the blocking pool.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn<T, F>(&self, f: F) -> Operation<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Facade, &CancelToken) -> gitdesk_git::Result<T> + Send + 'static,
    {
        let facade = Arc::clone(&self.facade);
        let cancel = CancelToken::new();
        let token = cancel.clone();
        let handle = tokio::task::spawn_blocking(move || f(&mut lock(&facade), &token));
        Operation { handle, cancel }
    }

    /// Fresh status snapshot.
    ///
    /// # Errors
    /// Returns [`gitdesk_git::Error::NotBound`] (wrapped) if nothing is bound.
    pub async fn status(&self) -> Result<StatusSnapshot> {
        self.run(|facade| facade.status()).await
    }

    pub fn clone_repository(&self, url: impl Into<String>, target: impl Into<PathBuf>) -> Operation<()> {
        let url = url.into();
        let target = target.into();
        self.spawn(move |facade, cancel| facade.clone_repository(&url, &target, cancel))
    }

    pub fn fetch(&self, remote: impl Into<String>, branch: Option<String>) -> Operation<()> {
        let remote = remote.into();
        self.spawn(move |facade, cancel| facade.fetch(&remote, branch.as_deref(), cancel))
    }

    pub fn pull(&self, remote: impl Into<String>, branch: Option<String>) -> Operation<()> {
        let remote = remote.into();
        self.spawn(move |facade, cancel| facade.pull(&remote, branch.as_deref(), cancel))
    }

    pub fn push(&self, remote: impl Into<String>, branch: Option<String>) -> Operation<()> {
        let remote = remote.into();
        self.spawn(move |facade, cancel| facade.push(&remote, branch.as_deref(), cancel))
    }
}

fn lock(facade: &Mutex<Facade>) -> MutexGuard<'_, Facade> {
    facade.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A running background operation.
#[derive(Debug)]
pub struct Operation<T> {
    handle: JoinHandle<gitdesk_git::Result<T>>,
    cancel: CancelToken,
}

impl<T> Operation<T> {
    /// Ask the operation to stop. It ends with `Cancelled`, or
    /// `Inconsistent` if the repository could not be verified afterwards.
    pub fn cancel(&self) {
        tracing::debug!("cancellation requested");
        self.cancel.cancel();
    }

    /// Token shared with the running operation, e.g. for a Ctrl-C handler.
    #[must_use]
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the result.
    ///
    /// # Errors
    /// Returns the facade error, or [`crate::Error::Worker`] if the
    /// operation panicked.
    pub async fn wait(self) -> Result<T> {
        Ok(self.handle.await??)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use gitdesk_git::{Error as GitError, ErrorKind};
    use std::process::Command as StdCommand;
    use std::time::Duration;
    use tempfile::TempDir;

    fn git(dir: &std::path::Path, args: &[&str]) {
        let status = StdCommand::new("git")
            .args(args)
            .current_dir(dir)
            .status()
            .unwrap();
        assert!(status.success(), "git {args:?} failed");
    }

    /// Bare remote with one commit on its default branch.
    fn seeded_remote() -> (TempDir, PathBuf) {
        let temp = TempDir::new().unwrap();
        let seed = temp.path().join("seed");
        std::fs::create_dir(&seed).unwrap();
        git(&seed, &["init"]);
        git(&seed, &["config", "user.name", "Test User"]);
        git(&seed, &["config", "user.email", "test@example.com"]);
        std::fs::write(seed.join("README.md"), "# Seed\n").unwrap();
        git(&seed, &["add", "."]);
        git(&seed, &["commit", "-m", "Initial commit"]);
        git(temp.path(), &["clone", "--bare", "seed", "remote.git"]);
        let remote = temp.path().join("remote.git");
        (temp, remote)
    }

    #[tokio::test]
    async fn test_run_and_status() {
        let temp = TempDir::new().unwrap();
        let session = Session::new(Facade::new());

        let err = session.status().await.unwrap_err();
        assert_eq!(err.git_kind(), Some(ErrorKind::NotBound));

        let path = temp.path().to_path_buf();
        session.run(move |facade| facade.init(path, false)).await.unwrap();
        std::fs::write(temp.path().join("a.txt"), "a").unwrap();

        let status = session.status().await.unwrap();
        assert_eq!(status.untracked, vec!["a.txt"]);
    }

    #[tokio::test]
    async fn test_clone_then_fetch() {
        let (temp, remote) = seeded_remote();
        let session = Session::new(Facade::new());
        let target = temp.path().join("work");

        session
            .clone_repository(remote.to_str().unwrap(), &target)
            .wait()
            .await
            .unwrap();
        assert!(target.join("README.md").exists());

        session.fetch("origin", None).wait().await.unwrap();
        let status = session.status().await.unwrap();
        assert!(status.remote_branches.iter().any(|b| b.starts_with("origin/")));
    }

    #[tokio::test]
    async fn test_cancel_reaches_operation() {
        let session = Session::new(Facade::new());
        let op: Operation<()> = session.spawn(|_facade, cancel| {
            while !cancel.is_cancelled() {
                std::thread::sleep(Duration::from_millis(5));
            }
            Err(GitError::Cancelled)
        });

        assert!(!op.is_finished());
        op.cancel();
        let err = op.wait().await.unwrap_err();
        assert_eq!(err.git_kind(), Some(ErrorKind::Cancelled));
    }

    #[tokio::test]
    async fn test_operations_are_serialized() {
        let session = Session::new(Facade::new());
        let order = Arc::new(Mutex::new(Vec::new()));

        let first_order = Arc::clone(&order);
        let first = session.spawn(move |_facade, _cancel| {
            std::thread::sleep(Duration::from_millis(50));
            first_order.lock().unwrap().push(1);
            Ok(())
        });
        // Give the first task time to take the lock.
        tokio::time::sleep(Duration::from_millis(10)).await;

        let second_order = Arc::clone(&order);
        session
            .run(move |_facade| {
                second_order.lock().unwrap().push(2);
                Ok(())
            })
            .await
            .unwrap();
        first.wait().await.unwrap();

        assert_eq!(*order.lock().unwrap(), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_panicking_operation_is_worker_error() {
        let session = Session::new(Facade::new());
        let err = session
            .run(|_facade| -> gitdesk_git::Result<()> { panic!("boom") })
            .await
            .unwrap_err();
        assert!(matches!(err, crate::Error::Worker(_)));

        // The facade is still usable afterwards.
        assert!(!session.lock().is_bound());
    }
}
