pub mod capture;
pub mod config;
pub mod geo;
pub mod math;
pub mod mission;
pub mod output;
pub mod pipeline;
pub mod planner;
pub mod survey;
pub mod terrain;

#[cfg(test)]
mod tests;
