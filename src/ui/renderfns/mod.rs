pub mod footer;
pub mod header;
pub mod utils;

pub use footer::{draw_footer, StatusLine};
pub use header::draw_header;
pub use utils::{format_stars, language_color, relative_age, truncate};
