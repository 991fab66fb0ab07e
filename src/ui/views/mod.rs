mod stars;

pub use stars::{draw_stars, ROWS_PER_ITEM};
