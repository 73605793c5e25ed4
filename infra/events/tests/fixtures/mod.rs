#![allow(dead_code)]

/// Stand-in for a store watch event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Applied(pub usize);

/// Object key as the controller queues it.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Key(pub &'static str);
