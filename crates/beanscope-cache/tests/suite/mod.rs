mod invalidation;
mod single_flight;
