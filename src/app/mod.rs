// App layer: Discord-facing surface (wire model, commands, rendering, routing, HTTP endpoint).

pub mod commands;
pub mod interactions;
pub mod render;
pub mod router;
pub mod server;
