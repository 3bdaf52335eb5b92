pub mod entities;
pub mod game;
pub mod levels;
pub mod resolver;
pub mod roles;
pub mod session;
pub mod settings;

pub use game::SlingshotGame;

sling_web::export_game!(SlingshotGame, "slingshot");
