#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("discord api error: {0}")]
    Serenity(#[from] serenity::Error),

    /// Discord ids are non-zero integers; anything else never came from Discord.
    #[error("invalid discord {kind} id '{value}'")]
    InvalidId { kind: &'static str, value: String },
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Wrap into the bridge error with the operation that failed.
    pub fn into_bridge(self, context: &str) -> parley_bridge::Error {
        parley_bridge::Error::external(context, self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_id_message() {
        let err = Error::InvalidId {
            kind: "channel",
            value: "abc".into(),
        };
        assert_eq!(err.to_string(), "invalid discord channel id 'abc'");
    }

    #[test]
    fn bridge_error_keeps_context() {
        let err = Error::InvalidId {
            kind: "guild",
            value: "0".into(),
        }
        .into_bridge("list channels");
        assert!(!err.is_fatal());
        assert_eq!(err.to_string(), "list channels: invalid discord guild id '0'");
    }
}
