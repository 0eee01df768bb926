// Text analysis: stopword filtering, n-gram query frequencies, word-cloud data.

pub mod cloud;
pub mod frequency;
pub mod stopwords;
pub mod tables;
