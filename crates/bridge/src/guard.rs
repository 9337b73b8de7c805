use tracing::{error, info};

use crate::{Error, Result, types::Workspace};

/// Check that the bot sees exactly one workspace and return it.
///
/// Zero workspaces leaves nothing to manage; two or more is refused outright
/// because mirroring private chats into the wrong server leaks them.
pub fn ensure_single_workspace(workspaces: &[Workspace]) -> Result<Workspace> {
    info!(
        guilds = ?workspaces.iter().map(|w| (&w.name, w.id.as_str())).collect::<Vec<_>>(),
        "visible guilds"
    );

    match workspaces {
        [] => {
            error!("bot is not a member of any server");
            Err(Error::NoWorkspace)
        },
        [only] => Ok(only.clone()),
        many => {
            error!(count = many.len(), "bot running on more than one server");
            Err(Error::MultipleWorkspaces {
                count: many.len(),
                names: many.iter().map(|w| w.name.clone()).collect(),
            })
        },
    }
}
