mod tables;

pub use self::tables::{
    benchmark as print_benchmark, candidates as print_candidates,
    contenders as print_contenders, metric_catalog as print_metric_catalog,
    round_sweep as print_round_sweep, weights as print_weights,
};
