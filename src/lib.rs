pub mod config;
pub mod cookies;
pub mod db;
pub mod error;
pub mod routes;
pub mod state;

pub mod crypto {
    pub mod field_cipher;
    pub mod token;
}

pub mod models {
    pub mod admin;
    pub mod registration;
    pub mod session;
}

pub mod repositories {
    pub mod admin;
    pub mod registration;
}

pub mod services {
    pub mod auth;
    pub mod registrations;
}

pub mod handlers {
    pub mod auth;
    pub mod registrations;
}

pub mod middleware_layer {
    pub mod auth;
    pub mod gate;
    pub mod rate_limit;
}

pub mod validation {
    pub mod auth;
    pub mod registration;
}
