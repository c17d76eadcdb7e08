use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use flate2::Compression;
use flate2::write::GzEncoder;
use tokio_util::sync::CancellationToken;

use eclectica_backend::{
    BackendContext, BackendError, EventSink, InfoMap, InstallEvent, InstallTarget, Language,
    LanguageBackend, RemoteVersion, Version, keys,
};
use eclectica_engine::{
    Attempt, EngineError, INSTALLED_MARKER, InstallMode, install, installed_versions, remove,
    resolve_version,
};
use eclectica_core::partial_path;
use eclectica_platform::{AppPaths, LanguageLock, symlink};

#[derive(Clone, Default)]
struct Calls {
    installs: Arc<AtomicUsize>,
    switches: Arc<AtomicUsize>,
    rollbacks: Arc<AtomicUsize>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Behaviour {
    Succeed,
    FailInstall,
    HangInstall,
    FailSwitch,
}

struct MockBackend {
    context: BackendContext,
    server_url: String,
    downloads: PathBuf,
    behaviour: Behaviour,
    calls: Calls,
    remote: Vec<RemoteVersion>,
}

#[async_trait]
impl LanguageBackend for MockBackend {
    fn language(&self) -> Language {
        Language::Elm
    }

    fn context(&self) -> &BackendContext {
        &self.context
    }

    fn info(&self, version: &Version) -> Result<InfoMap, BackendError> {
        let filename = format!("mock-{version}");
        Ok(InfoMap::new()
            .with(keys::URL, format!("{}/{filename}.tar.gz", self.server_url))
            .with(keys::FILENAME, filename)
            .with(keys::ARCHIVE_FOLDER, self.downloads.to_string_lossy()))
    }

    fn bins(&self) -> &'static [&'static str] {
        &["elm"]
    }

    fn dots(&self) -> &'static [&'static str] {
        &[".elm-version"]
    }

    async fn list_remote(&self) -> Result<Vec<RemoteVersion>, BackendError> {
        Ok(self.remote.clone())
    }

    async fn install(&self, _target: &InstallTarget) -> Result<(), BackendError> {
        self.calls.installs.fetch_add(1, Ordering::SeqCst);
        match self.behaviour {
            Behaviour::Succeed | Behaviour::FailSwitch => Ok(()),
            Behaviour::FailInstall => Err(BackendError::CommandFailed {
                program: "make".to_string(),
                details: "no rule to make target".to_string(),
            }),
            Behaviour::HangInstall => {
                std::future::pending::<()>().await;
                Ok(())
            }
        }
    }

    async fn switch(&self, _target: &InstallTarget) -> Result<(), BackendError> {
        self.calls.switches.fetch_add(1, Ordering::SeqCst);
        if self.behaviour == Behaviour::FailSwitch {
            return Err(BackendError::CommandFailed {
                program: "npm".to_string(),
                details: "migrate failed".to_string(),
            });
        }
        Ok(())
    }

    async fn rollback(&self, _target: &InstallTarget) {
        self.calls.rollbacks.fetch_add(1, Ordering::SeqCst);
    }
}

struct Fixture {
    _temp: tempfile::TempDir,
    paths: AppPaths,
    server: mockito::ServerGuard,
    events: EventSink,
    receiver: crossbeam_channel::Receiver<InstallEvent>,
    calls: Calls,
}

impl Fixture {
    async fn new() -> Self {
        let temp = tempfile::tempdir().unwrap();
        let paths = AppPaths::with_root(temp.path());
        std::fs::create_dir_all(&paths.proxy_dir).unwrap();
        std::fs::write(paths.proxy_source(), "proxy").unwrap();
        let (events, receiver) = EventSink::channel();
        Self {
            _temp: temp,
            paths,
            server: mockito::Server::new_async().await,
            events,
            receiver,
            calls: Calls::default(),
        }
    }

    fn backend(&self, behaviour: Behaviour) -> MockBackend {
        MockBackend {
            context: BackendContext::new(
                self.paths.clone(),
                reqwest::Client::new(),
                self.events.clone(),
            ),
            server_url: self.server.url(),
            downloads: self.paths.root.join("downloads"),
            behaviour,
            calls: self.calls.clone(),
            remote: ["6.3.1", "6.8.0", "7.0.0-rc1"]
                .into_iter()
                .map(RemoteVersion::new)
                .collect(),
        }
    }

    async fn serve(&mut self, version: &str) -> mockito::Mock {
        self.server
            .mock("GET", format!("/mock-{version}.tar.gz").as_str())
            .with_status(200)
            .with_body(archive(&format!("mock-{version}")))
            .create_async()
            .await
    }

    fn version_dir(&self, version: &str) -> PathBuf {
        self.paths.version_dir("elm", version)
    }

    fn proxy(&self) -> PathBuf {
        self.paths.bin_dir().join("elm")
    }

    fn current(&self) -> Option<PathBuf> {
        std::fs::read_link(self.paths.current_link("elm")).ok()
    }
}

fn archive(top: &str) -> Vec<u8> {
    let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::default()));
    let body = b"#!/bin/sh\necho mock\n";
    let mut header = tar::Header::new_gnu();
    header.set_size(body.len() as u64);
    header.set_mode(0o755);
    header.set_cksum();
    builder
        .append_data(&mut header, format!("{top}/bin/elm"), &body[..])
        .unwrap();
    let mut encoder = builder.into_inner().unwrap();
    encoder.flush().unwrap();
    encoder.finish().unwrap()
}

async fn run(backend: MockBackend, version: &str, mode: &InstallMode) -> Result<(), EngineError> {
    let mut attempt = Attempt::new(backend, version.parse().unwrap())?;
    install(&mut attempt, mode, &CancellationToken::new()).await
}

#[tokio::test]
async fn fresh_global_install_links_and_marks_version() {
    let mut fixture = Fixture::new().await;
    let mock = fixture.serve("6.8.0").await;

    run(fixture.backend(Behaviour::Succeed), "6.8.0", &InstallMode::Global)
        .await
        .unwrap();

    mock.assert_async().await;
    let dir = fixture.version_dir("6.8.0");
    assert!(dir.join("bin/elm").is_file());
    assert!(dir.join(INSTALLED_MARKER).is_file());
    assert_eq!(fixture.current(), Some(dir));
    assert_eq!(std::fs::read_to_string(fixture.proxy()).unwrap(), "proxy");
    assert!(!fixture.paths.root.join("downloads/mock-6.8.0.tar.gz").exists());

    let events: Vec<InstallEvent> = fixture.receiver.try_iter().collect();
    assert!(matches!(events.first(), Some(InstallEvent::Started { .. })));
    assert!(matches!(events.last(), Some(InstallEvent::Done { .. })));
}

#[tokio::test]
async fn reinstall_only_switches() {
    let mut fixture = Fixture::new().await;
    fixture.serve("6.8.0").await;
    run(fixture.backend(Behaviour::Succeed), "6.8.0", &InstallMode::Global)
        .await
        .unwrap();

    let untouched = fixture
        .server
        .mock("GET", "/mock-6.8.0.tar.gz")
        .expect(0)
        .create_async()
        .await;

    run(fixture.backend(Behaviour::Succeed), "6.8.0", &InstallMode::Global)
        .await
        .unwrap();

    untouched.assert_async().await;
    assert_eq!(fixture.calls.installs.load(Ordering::SeqCst), 1);
    assert_eq!(fixture.calls.switches.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn missing_upstream_archive_is_incorrect_version() {
    let mut fixture = Fixture::new().await;
    fixture
        .server
        .mock("GET", "/mock-9.9.9.tar.gz")
        .with_status(404)
        .create_async()
        .await;

    let error = run(fixture.backend(Behaviour::Succeed), "9.9.9", &InstallMode::Global)
        .await
        .unwrap_err();

    assert_eq!(error.to_string(), "incorrect version 9.9.9");
    assert!(!fixture.paths.language_prefix("elm").exists());
}

#[tokio::test]
async fn failed_only_install_removes_version_and_proxies() {
    let mut fixture = Fixture::new().await;
    fixture.serve("6.8.0").await;

    let error = run(fixture.backend(Behaviour::FailInstall), "6.8.0", &InstallMode::Global)
        .await
        .unwrap_err();

    assert_eq!(error.to_string(), "no rule to make target");
    assert!(!fixture.version_dir("6.8.0").exists());
    assert!(!fixture.paths.language_prefix("elm").exists());
    assert!(!fixture.proxy().exists());
    assert_eq!(fixture.calls.rollbacks.load(Ordering::SeqCst), 1);
    assert!(
        fixture
            .receiver
            .try_iter()
            .any(|event| matches!(event, InstallEvent::RolledBack { .. }))
    );
}

#[tokio::test]
async fn failed_install_beside_sibling_keeps_proxies_and_pointer() {
    let mut fixture = Fixture::new().await;
    fixture.serve("6.3.1").await;
    fixture.serve("6.8.0").await;
    run(fixture.backend(Behaviour::Succeed), "6.3.1", &InstallMode::Global)
        .await
        .unwrap();

    run(fixture.backend(Behaviour::FailInstall), "6.8.0", &InstallMode::Global)
        .await
        .unwrap_err();

    assert!(!fixture.version_dir("6.8.0").exists());
    assert!(fixture.version_dir("6.3.1").is_dir());
    assert!(fixture.proxy().exists());
    assert_eq!(fixture.current(), Some(fixture.version_dir("6.3.1")));
}

#[tokio::test]
async fn download_is_skipped_when_destination_exists() {
    let fixture = Fixture::new().await;
    let mut backend = fixture.backend(Behaviour::Succeed);
    backend.server_url = "http://127.0.0.1:1".to_string();
    std::fs::create_dir_all(fixture.version_dir("6.8.0")).unwrap();

    let attempt = Attempt::new(backend, Version::new(6, 8, 0)).unwrap();

    assert!(!attempt.download().await.unwrap());
}

#[tokio::test]
async fn extract_twice_is_safe() {
    let mut fixture = Fixture::new().await;
    fixture.serve("6.8.0").await;
    let attempt = Attempt::new(fixture.backend(Behaviour::Succeed), Version::new(6, 8, 0)).unwrap();

    assert!(attempt.download().await.unwrap());
    attempt.extract().await.unwrap();
    attempt.extract().await.unwrap();

    let prefix = fixture.paths.language_prefix("elm");
    let entries: Vec<String> = std::fs::read_dir(&prefix)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(entries, vec!["6.8.0"]);
    assert!(fixture.version_dir("6.8.0").join("bin/elm").is_file());
}

#[tokio::test]
async fn local_install_writes_dotfile_and_links_only_without_global() {
    let mut fixture = Fixture::new().await;
    fixture.serve("6.3.1").await;
    fixture.serve("6.8.0").await;
    let project = tempfile::tempdir().unwrap();
    let local = InstallMode::Local {
        dir: project.path().to_path_buf(),
    };

    run(fixture.backend(Behaviour::Succeed), "6.3.1", &local)
        .await
        .unwrap();
    assert_eq!(fixture.current(), Some(fixture.version_dir("6.3.1")));

    run(fixture.backend(Behaviour::Succeed), "6.8.0", &local)
        .await
        .unwrap();
    assert_eq!(fixture.current(), Some(fixture.version_dir("6.3.1")));
    assert_eq!(
        std::fs::read_to_string(project.path().join(".elm-version")).unwrap(),
        "6.8.0\n"
    );
}

#[tokio::test]
async fn failed_local_switch_keeps_previous_dotfile() {
    let mut fixture = Fixture::new().await;
    fixture.serve("6.3.1").await;
    fixture.serve("6.8.0").await;
    run(fixture.backend(Behaviour::Succeed), "6.3.1", &InstallMode::Global)
        .await
        .unwrap();
    let project = tempfile::tempdir().unwrap();
    let dotfile = project.path().join(".elm-version");
    std::fs::write(&dotfile, "6.3.1\n").unwrap();
    let local = InstallMode::Local {
        dir: project.path().to_path_buf(),
    };

    let error = run(fixture.backend(Behaviour::FailSwitch), "6.8.0", &local)
        .await
        .unwrap_err();

    assert_eq!(error.to_string(), "migrate failed");
    assert!(!fixture.version_dir("6.8.0").exists());
    assert_eq!(std::fs::read_to_string(&dotfile).unwrap(), "6.3.1\n");
    assert_eq!(fixture.current(), Some(fixture.version_dir("6.3.1")));
}

#[tokio::test]
async fn failed_local_switch_to_installed_version_writes_no_dotfile() {
    let mut fixture = Fixture::new().await;
    fixture.serve("6.3.1").await;
    run(fixture.backend(Behaviour::Succeed), "6.3.1", &InstallMode::Global)
        .await
        .unwrap();
    let project = tempfile::tempdir().unwrap();
    let local = InstallMode::Local {
        dir: project.path().to_path_buf(),
    };

    run(fixture.backend(Behaviour::FailSwitch), "6.3.1", &local)
        .await
        .unwrap_err();

    assert!(!project.path().join(".elm-version").exists());
    assert!(fixture.version_dir("6.3.1").join(INSTALLED_MARKER).is_file());
}

#[tokio::test]
async fn failed_global_switch_to_installed_version_restores_pointer() {
    let mut fixture = Fixture::new().await;
    fixture.serve("6.3.1").await;
    fixture.serve("6.8.0").await;
    run(fixture.backend(Behaviour::Succeed), "6.3.1", &InstallMode::Global)
        .await
        .unwrap();
    run(fixture.backend(Behaviour::Succeed), "6.8.0", &InstallMode::Global)
        .await
        .unwrap();

    let error = run(fixture.backend(Behaviour::FailSwitch), "6.3.1", &InstallMode::Global)
        .await
        .unwrap_err();

    assert_eq!(error.to_string(), "migrate failed");
    assert_eq!(fixture.current(), Some(fixture.version_dir("6.8.0")));
    assert!(fixture.version_dir("6.3.1").join(INSTALLED_MARKER).is_file());
    assert!(fixture.proxy().exists());
}

#[tokio::test]
async fn failed_global_switch_on_fresh_install_restores_pointer() {
    let mut fixture = Fixture::new().await;
    fixture.serve("6.3.1").await;
    fixture.serve("6.8.0").await;
    run(fixture.backend(Behaviour::Succeed), "6.3.1", &InstallMode::Global)
        .await
        .unwrap();

    run(fixture.backend(Behaviour::FailSwitch), "6.8.0", &InstallMode::Global)
        .await
        .unwrap_err();

    assert!(!fixture.version_dir("6.8.0").exists());
    assert_eq!(fixture.current(), Some(fixture.version_dir("6.3.1")));
}

#[tokio::test]
async fn interrupt_rolls_back_running_step() {
    let mut fixture = Fixture::new().await;
    fixture.serve("6.8.0").await;
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        trigger.cancel();
    });

    let mut attempt =
        Attempt::new(fixture.backend(Behaviour::HangInstall), Version::new(6, 8, 0)).unwrap();
    let error = install(&mut attempt, &InstallMode::Global, &cancel)
        .await
        .unwrap_err();

    assert!(error.is_interrupted());
    assert!(!fixture.paths.language_prefix("elm").exists());
    assert_eq!(fixture.calls.rollbacks.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn interrupted_download_leaves_no_partial_archive() {
    let mut fixture = Fixture::new().await;
    fixture
        .server
        .mock("GET", "/mock-6.8.0.tar.gz")
        .with_status(200)
        .with_chunked_body(|writer| {
            loop {
                writer.write_all(b"partial archive bytes")?;
                std::thread::sleep(Duration::from_millis(20));
            }
        })
        .create_async()
        .await;
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(300)).await;
        trigger.cancel();
    });

    let mut attempt =
        Attempt::new(fixture.backend(Behaviour::Succeed), Version::new(6, 8, 0)).unwrap();
    let archive = PathBuf::from(attempt.info().get(keys::ARCHIVE_PATH).unwrap());
    let error = install(&mut attempt, &InstallMode::Global, &cancel)
        .await
        .unwrap_err();

    assert!(error.is_interrupted());
    assert!(!archive.exists());
    assert!(!partial_path(&archive).exists());
    assert!(!fixture.paths.language_prefix("elm").exists());
}

#[tokio::test]
async fn concurrent_attempt_is_locked_out() {
    let fixture = Fixture::new().await;
    let _held = LanguageLock::acquire(&fixture.paths.lock_file("elm"), "elm").unwrap();

    let error = run(fixture.backend(Behaviour::Succeed), "6.8.0", &InstallMode::Global)
        .await
        .unwrap_err();

    assert!(matches!(error, EngineError::Locked(_)));
}

#[tokio::test]
async fn removing_active_version_drops_proxies_then_prefix() {
    let mut fixture = Fixture::new().await;
    fixture.serve("6.3.1").await;
    fixture.serve("6.8.0").await;
    run(fixture.backend(Behaviour::Succeed), "6.3.1", &InstallMode::Global)
        .await
        .unwrap();
    run(fixture.backend(Behaviour::Succeed), "6.8.0", &InstallMode::Global)
        .await
        .unwrap();

    let backend = fixture.backend(Behaviour::Succeed);
    remove(&backend, &Version::new(6, 8, 0)).unwrap();
    assert!(!fixture.proxy().exists());
    assert_eq!(fixture.current(), None);
    assert_eq!(installed_versions(&fixture.paths, Language::Elm).unwrap().len(), 1);

    remove(&backend, &Version::new(6, 3, 1)).unwrap();
    assert!(!fixture.paths.language_prefix("elm").exists());

    let error = remove(&backend, &Version::new(6, 3, 1)).unwrap_err();
    assert!(matches!(error, EngineError::NotInstalled { .. }));
}

#[tokio::test]
async fn removing_inactive_version_keeps_proxies() {
    let mut fixture = Fixture::new().await;
    fixture.serve("6.3.1").await;
    fixture.serve("6.8.0").await;
    run(fixture.backend(Behaviour::Succeed), "6.3.1", &InstallMode::Global)
        .await
        .unwrap();
    run(fixture.backend(Behaviour::Succeed), "6.8.0", &InstallMode::Global)
        .await
        .unwrap();

    remove(&fixture.backend(Behaviour::Succeed), &Version::new(6, 3, 1)).unwrap();

    assert!(fixture.proxy().exists());
    assert_eq!(fixture.current(), Some(fixture.version_dir("6.8.0")));
}

#[tokio::test]
async fn switch_back_to_installed_version_restores_proxies() {
    let mut fixture = Fixture::new().await;
    fixture.serve("6.3.1").await;
    fixture.serve("6.8.0").await;
    run(fixture.backend(Behaviour::Succeed), "6.3.1", &InstallMode::Global)
        .await
        .unwrap();
    run(fixture.backend(Behaviour::Succeed), "6.8.0", &InstallMode::Global)
        .await
        .unwrap();
    remove(&fixture.backend(Behaviour::Succeed), &Version::new(6, 8, 0)).unwrap();

    run(fixture.backend(Behaviour::Succeed), "6.3.1", &InstallMode::Global)
        .await
        .unwrap();

    assert!(fixture.proxy().exists());
    assert_eq!(fixture.current(), Some(fixture.version_dir("6.3.1")));
}

#[tokio::test]
async fn resolve_version_picks_highest_match() {
    let fixture = Fixture::new().await;
    let backend = fixture.backend(Behaviour::Succeed);

    assert_eq!(
        resolve_version(&backend, "6").await.unwrap(),
        Version::new(6, 8, 0)
    );
    assert_eq!(
        resolve_version(&backend, "6.3.1").await.unwrap(),
        Version::new(6, 3, 1)
    );
    assert_eq!(
        resolve_version(&backend, "latest").await.unwrap(),
        Version::new(6, 8, 0)
    );
    assert!(matches!(
        resolve_version(&backend, " ").await,
        Err(EngineError::VersionNotDefined)
    ));
    assert_eq!(
        resolve_version(&backend, "9").await.unwrap_err().to_string(),
        "incorrect version 9"
    );
}

#[tokio::test]
async fn stale_pointer_target_is_not_installed() {
    let fixture = Fixture::new().await;
    let dir = fixture.version_dir("6.8.0");
    std::fs::create_dir_all(&dir).unwrap();
    symlink(&dir, &fixture.paths.current_link("elm")).unwrap();

    let installed = installed_versions(&fixture.paths, Language::Elm).unwrap();
    assert!(installed.is_empty());
    assert!(!Path::new(&dir).join(INSTALLED_MARKER).exists());
}
