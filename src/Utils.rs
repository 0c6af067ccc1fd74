//! different utility modules used throughout the project
/// logger initialisation and saving of solutions into csv files
pub mod logger;
/// tiny module to plot lab results into png files
pub mod plots;
/// pretty-printed result tables
pub mod tables;
/// parse document with structure like "title1 \n key1: value1, value2 \n title2 \n key3: value3" into sections of typed values
pub mod task_parser;
