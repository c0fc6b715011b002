/// State management module
///
/// This module handles all application state, including:
/// - Backend DTOs passed through to rendering (data.rs)
/// - Layout context for navigation and scroll chrome (chrome.rs)
/// - The data-access interface the screens depend on (repository.rs)
/// - The SQLite catalog implementing it (library.rs)

pub mod chrome;
pub mod data;
pub mod library;
pub mod repository;
