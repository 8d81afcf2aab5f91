pub mod csv;
pub mod xlsx;

pub use csv::write_pipe_csv;
pub use xlsx::{save_workbook, write_workbook};
