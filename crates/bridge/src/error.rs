use std::{error::Error as StdError, time::Duration};

/// Crate-wide result type for bridge operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Typed bridge errors.
///
/// The first group is fatal at startup, the rest are per-message failures
/// that handlers log and swallow.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The hub credential sees no workspace at all.
    #[error("no hub workspace is visible to the bot; invite it to exactly one server")]
    NoWorkspace,

    /// The hub credential sees more than one workspace.
    #[error("bot is running on {count} servers ({}); refusing to guess which one to manage", names.join(", "))]
    MultipleWorkspaces { count: usize, names: Vec<String> },

    /// A scaffolding channel could not be created.
    #[error("failed to create required channel '{name}': {source}")]
    StructureSync {
        name: String,
        #[source]
        source: Box<Error>,
    },

    /// A category that structure sync guarantees is missing.
    #[error("required category '{name}' does not exist in the workspace")]
    MissingCategory { name: String },

    /// No live conversation matches a channel topic.
    #[error("chat '{name}' not found")]
    ConversationNotFound { name: String },

    /// A platform round trip exceeded its deadline.
    #[error("{operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    /// An SDK event stream ended.
    #[error("{stream} event stream closed")]
    StreamClosed { stream: &'static str },

    /// Wrapped source error from a platform SDK.
    #[error("{context}: {source}")]
    External {
        context: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
}

impl Error {
    #[must_use]
    pub fn external(
        context: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self::External {
            context: context.into(),
            source: Box::new(source),
        }
    }

    #[must_use]
    pub fn structure_sync(name: impl Into<String>, source: Error) -> Self {
        Self::StructureSync {
            name: name.into(),
            source: Box::new(source),
        }
    }

    /// Whether this error must halt relay activation.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::NoWorkspace | Self::MultipleWorkspaces { .. } | Self::StructureSync { .. }
        )
    }
}

/// Run a platform round trip under a deadline.
pub async fn with_timeout<T, F>(operation: &'static str, after: Duration, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(after, fut).await {
        Ok(result) => result,
        Err(_) => Err(Error::Timeout { operation, after }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fatal_classification() {
        assert!(Error::NoWorkspace.is_fatal());
        assert!(
            Error::MultipleWorkspaces {
                count: 2,
                names: vec!["a".into(), "b".into()],
            }
            .is_fatal()
        );
        assert!(Error::structure_sync("main", Error::NoWorkspace).is_fatal());
        assert!(
            !Error::ConversationNotFound {
                name: "Alice".into()
            }
            .is_fatal()
        );
    }

    #[test]
    fn multiple_workspaces_message_lists_names() {
        let err = Error::MultipleWorkspaces {
            count: 2,
            names: vec!["home".into(), "work".into()],
        };
        assert_eq!(
            err.to_string(),
            "bot is running on 2 servers (home, work); refusing to guess which one to manage"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_is_reported() {
        let result: Result<()> = with_timeout("send message", Duration::from_secs(1), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;
        assert!(matches!(
            result,
            Err(Error::Timeout {
                operation: "send message",
                ..
            })
        ));
    }
}
