pub mod admin_commands;
pub mod checks;

/// A way to group commands together.
///
/// Implementors of this trait can return a list of their commands within their own module.
/// Typically, you would group commands by their required permissions.
///
/// This way, you only need to `pub` the implementor and not the commands themselves.
pub trait CommandsContainer {
    type Data;
    type Error;

    fn get_all() -> Vec<poise::Command<Self::Data, Self::Error>>;
}
