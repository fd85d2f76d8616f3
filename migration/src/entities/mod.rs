pub mod sequence_counter;
pub mod url_mapping;
