// Access-control decisions

pub mod ownership;
