//! # neosched
//!
//! Scheduling core for near-Earth-object follow-up on a robotic telescope
//! network. Given a list of candidate targets with orbital elements, the
//! crate predicts where each target is on the sky, decides which targets
//! are worth telescope time tonight, sizes an exposure plan for each and
//! submits the surviving request groups to the observation portal.
//!
//! ## Overview
//!
//! * [`elements`] — orbital element sets and their validation
//! * [`kepler`], [`sun`], [`moon`] — two-body propagation and the solar
//!   and lunar positions the visibility gates need
//! * [`ephemeris`] — topocentric predictions (position, rate, magnitude)
//! * [`visibility`] — dark-and-up windows per night
//! * [`exposure`] — magnitude-driven slot and exposure sizing
//! * [`candidates`] — the triage gate and hemisphere routing
//! * [`longterm`] — multi-week lookahead for monitored targets
//! * [`submit`], [`batch`] — the submission state machine and the batch
//!   pass driving it
//! * [`store`], [`network`] — persistence and portal seams
pub mod angles;
pub mod batch;
pub mod candidates;
pub mod constants;
pub mod elements;
pub mod ephemeris;
pub mod errors;
pub mod exposure;
pub mod kepler;
pub mod longterm;
pub mod moon;
pub mod network;
pub mod sites;
pub mod store;
pub mod submit;
pub mod sun;
pub mod time;
pub mod visibility;
