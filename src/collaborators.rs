//! Page-level collaborators (analytics tags, ad loaders).
//!
//! They are mounted once at start-up and do their own work; the viewer
//! never depends on whether they succeed. Each collaborator owns its own
//! "already mounted" state through [`OnceMount`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors a collaborator may report while mounting.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CollaboratorError {
    /// The collaborator has no client or tracking id.
    #[error("{0}: missing identifier")]
    MissingId(String),
    /// Mounting failed for another reason.
    #[error("{name}: {reason}")]
    MountFailed {
        /// Collaborator name.
        name: String,
        /// What went wrong.
        reason: String,
    },
}

/// Something mounted once at application start.
pub trait Collaborator {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Performs the collaborator's side effects.
    fn mount(&mut self) -> Result<(), CollaboratorError>;

    /// Undoes `mount`. Defaults to nothing.
    fn unmount(&mut self) {}
}

impl<C: Collaborator + ?Sized> Collaborator for Box<C> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn mount(&mut self) -> Result<(), CollaboratorError> {
        (**self).mount()
    }

    fn unmount(&mut self) {
        (**self).unmount()
    }
}

/// Idempotent mount wrapper.
///
/// Mounting an already mounted collaborator is a no-op; a failed mount may
/// be retried.
#[derive(Debug)]
pub struct OnceMount<C> {
    inner: C,
    mounted: bool,
}

impl<C: Collaborator> OnceMount<C> {
    /// Wraps an unmounted collaborator.
    pub fn new(inner: C) -> Self {
        Self {
            inner,
            mounted: false,
        }
    }

    /// Mounts if not yet mounted. Returns true if this call did the work.
    pub fn mount(&mut self) -> Result<bool, CollaboratorError> {
        if self.mounted {
            return Ok(false);
        }
        self.inner.mount()?;
        self.mounted = true;
        Ok(true)
    }

    /// Unmounts if mounted.
    pub fn unmount(&mut self) {
        if self.mounted {
            self.inner.unmount();
            self.mounted = false;
        }
    }

    /// Whether a mount has succeeded and not been undone.
    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// The wrapped collaborator.
    pub fn inner(&self) -> &C {
        &self.inner
    }

    /// Mutable access to the wrapped collaborator.
    pub fn inner_mut(&mut self) -> &mut C {
        &mut self.inner
    }
}

/// Kind of script tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScriptKind {
    /// Google tag / analytics loader.
    Analytics,
    /// AdSense auto-ads loader.
    Ad,
}

/// Collaborator entry in the configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollaboratorConfig {
    /// Which loader to inject.
    pub kind: ScriptKind,
    /// Tracking id or ad client id.
    pub id: String,
}

/// Injects a third-party loader script into the host page.
#[derive(Debug, Clone)]
pub struct ScriptTag {
    kind: ScriptKind,
    id: String,
    markup: Option<String>,
}

impl ScriptTag {
    /// Analytics tag for `tracking_id`.
    pub fn analytics(tracking_id: impl Into<String>) -> Self {
        Self::new(ScriptKind::Analytics, tracking_id)
    }

    /// Auto-ads loader for `client`.
    pub fn ad_client(client: impl Into<String>) -> Self {
        Self::new(ScriptKind::Ad, client)
    }

    /// Script tag of the given kind.
    pub fn new(kind: ScriptKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
            markup: None,
        }
    }

    /// The loader markup for this tag.
    pub fn render(&self) -> String {
        match self.kind {
            ScriptKind::Analytics => format!(
                concat!(
                    "<script async src=\"https://www.googletagmanager.com/gtag/js?id={id}\"></script>\n",
                    "<script>window.dataLayer = window.dataLayer || [];",
                    "function gtag(){{dataLayer.push(arguments);}}",
                    "gtag('js', new Date());gtag('config', '{id}');</script>"
                ),
                id = self.id
            ),
            ScriptKind::Ad => format!(
                concat!(
                    "<script async data-ad-client=\"{id}\" ",
                    "src=\"https://pagead2.googlesyndication.com/pagead/js/adsbygoogle.js\" ",
                    "crossorigin=\"anonymous\"></script>"
                ),
                id = self.id
            ),
        }
    }

    /// Markup injected by the last successful mount.
    pub fn markup(&self) -> Option<&str> {
        self.markup.as_deref()
    }
}

impl Collaborator for ScriptTag {
    fn name(&self) -> &str {
        match self.kind {
            ScriptKind::Analytics => "analytics",
            ScriptKind::Ad => "ad",
        }
    }

    fn mount(&mut self) -> Result<(), CollaboratorError> {
        if self.id.trim().is_empty() {
            return Err(CollaboratorError::MissingId(self.name().to_string()));
        }
        self.markup = Some(self.render());
        tracing::debug!(collaborator = self.name(), id = %self.id, "Script tag injected");
        Ok(())
    }

    fn unmount(&mut self) {
        self.markup = None;
    }
}

/// The set of collaborators mounted at start-up.
#[derive(Default)]
pub struct Collaborators {
    entries: Vec<OnceMount<Box<dyn Collaborator>>>,
}

impl Collaborators {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a script tag per config entry.
    pub fn from_config(configs: &[CollaboratorConfig]) -> Self {
        let mut set = Self::new();
        for config in configs {
            set.push(ScriptTag::new(config.kind, config.id.clone()));
        }
        set
    }

    /// Adds a collaborator, initially unmounted.
    pub fn push(&mut self, collaborator: impl Collaborator + 'static) {
        self.entries.push(OnceMount::new(Box::new(collaborator)));
    }

    /// Mounts everything not yet mounted. Failures are logged, never raised.
    /// Returns how many collaborators are mounted afterwards.
    pub fn mount_all(&mut self) -> usize {
        for entry in &mut self.entries {
            if let Err(error) = entry.mount() {
                tracing::warn!(%error, "Collaborator failed to mount");
            }
        }
        self.mounted_count()
    }

    /// Unmounts everything that is mounted.
    pub fn unmount_all(&mut self) {
        self.entries.iter_mut().for_each(OnceMount::unmount);
    }

    /// Number of mounted collaborators.
    pub fn mounted_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_mounted()).count()
    }

    /// Number of registered collaborators.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
