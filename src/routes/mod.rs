pub mod auth_routes;
pub mod trip_routes;
pub mod user_routes;
pub mod vehicle_routes;
