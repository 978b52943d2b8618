pub mod base;
pub mod factory;

// Review sites
pub mod beeradvocate;
pub mod ratebeer;
pub mod untappd;

// Page discovery and menus
pub mod beermenus;
pub mod web_search;
