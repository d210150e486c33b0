/// Router Module Index
///
/// Splits the console's routes by who may reach them. Public screens are merged as-is;
/// the other two modules sit behind the navigation guard, which consults the route
/// table on every request.

/// Screens and endpoints rendered without a session (home, help, login, menu...).
pub mod public;

/// Front-desk and trainer screens. The guard checks each path's role set.
pub mod screens;

/// Screens restricted to administrators (users, trainers, accounting).
pub mod admin;
