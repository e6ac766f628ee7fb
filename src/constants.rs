pub const API_VERSION: &str = "v1";

pub mod sentiment {

    pub const POSITIVE_TAG: &str = "<span class=\"positive\">";

    pub const NEGATIVE_TAG: &str = "<span class=\"negative\">";
}

pub mod pagination {

    pub const DEFAULT_PAGE: u64 = 1;

    pub const DEFAULT_PER_PAGE: u64 = 10;

    pub const MAX_PER_PAGE: u64 = 100;
}

pub mod limits {

    pub const MAX_CONTENT_CHARS: usize = 10_000;
}
