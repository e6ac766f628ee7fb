pub mod sentiment;

pub use sentiment::GithubModelsClient;
