/// Filename recorded on a product that has no uploaded images.
pub const PLACEHOLDER_IMAGE: &str = "placeholder.png";

pub mod limits {

    pub const DEFAULT_PAGE_SIZE: u64 = 20;

    pub const MAX_PAGE_SIZE: u64 = 100;

    pub const TOP_PRODUCTS: u64 = 10;

    pub const COMPARE_MAX: usize = 4;
}

pub mod session {

    pub const ADMIN_ID_KEY: &str = "admin_id";

    pub const ADMIN_ACTIVITY_KEY: &str = "admin_last_activity";

    pub const USER_ID_KEY: &str = "user_id";

    pub const USER_ACTIVITY_KEY: &str = "user_last_activity";

    pub const CSRF_KEY: &str = "csrf_token";

    pub const CART_KEY: &str = "cart";

    pub const REMEMBER_COOKIE: &str = "wigtopia_remember";
}
