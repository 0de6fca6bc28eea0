pub mod align;
pub mod builder;
pub mod catalog;
pub mod cluster;
pub mod defaults;
pub mod extend;
pub mod fragments;
pub mod joined_seq; // Joined forward + reverse-complement sequence space
pub mod merge;
pub mod opts;
pub mod repeat;
pub mod utils;

// Note: suffix array construction uses the `bio` crate; the clusterer only
// sees it through the SuffixSupplier trait in `cluster`.
