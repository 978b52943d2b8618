pub mod ports;

// Use cases
pub mod beer_list;
pub mod lookup_use_case;
pub mod report_use_case;
