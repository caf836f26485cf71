//! Delivery of tracking events to an HTTP sink
