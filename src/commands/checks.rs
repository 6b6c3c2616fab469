use anyhow::anyhow;

use crate::{BotContext, BotError};

/// Guards admin-only commands. Failing the check carries a message that the
/// error hook relays to the invoker ephemerally.
pub async fn is_admin(ctx: BotContext<'_>) -> Result<bool, BotError> {
    let member = ctx
        .author_member()
        .await
        .ok_or(anyhow!("This command can only be used in a guild."))?;

    let permissions = member
        .permissions
        .ok_or(anyhow!("Could not resolve your permissions."))?;

    if permissions.administrator() {
        Ok(true)
    } else {
        Err(anyhow!("You need Administrator permissions to use this."))
    }
}
