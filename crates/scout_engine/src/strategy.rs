/// One named extraction strategy. `F` is usually a plain `fn` pointer taking
/// the context the chain runs against.
#[derive(Clone, Copy)]
pub struct Strategy<F> {
    pub name: &'static str,
    pub run: F,
}

/// Value produced by a chain together with the strategy that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved<T> {
    pub value: T,
    pub strategy: &'static str,
}

/// Runs strategies in order and returns the first value produced.
pub fn first_success<F, T>(
    strategies: &[Strategy<F>],
    mut apply: impl FnMut(&F) -> Option<T>,
) -> Option<Resolved<T>> {
    strategies.iter().find_map(|strategy| {
        apply(&strategy.run).map(|value| Resolved {
            value,
            strategy: strategy.name,
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    type Probe = fn(&str) -> Option<usize>;

    fn digits(input: &str) -> Option<usize> {
        input.parse().ok()
    }

    fn length(input: &str) -> Option<usize> {
        (!input.is_empty()).then(|| input.len())
    }

    const CHAIN: &[Strategy<Probe>] = &[
        Strategy {
            name: "digits",
            run: digits,
        },
        Strategy {
            name: "length",
            run: length,
        },
    ];

    #[test]
    fn earlier_strategy_wins() {
        let resolved = first_success(CHAIN, |run| run("42")).unwrap();
        assert_eq!(resolved, Resolved { value: 42, strategy: "digits" });
    }

    #[test]
    fn falls_through_to_later_strategy() {
        let resolved = first_success(CHAIN, |run| run("abc")).unwrap();
        assert_eq!(resolved.strategy, "length");
        assert_eq!(first_success(CHAIN, |run| run("")), None);
    }
}
