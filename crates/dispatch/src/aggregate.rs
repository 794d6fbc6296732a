//! Card run grouping.

use {
    relay_nlu::{Card, MessageFragment},
    tracing::warn,
};

use crate::classify::classify;

/// What one dispatch unit sends.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchPayload {
    /// Any non-card fragment, sent on its own.
    Single(MessageFragment),
    /// One or more consecutive cards sent as a single generic template.
    Carousel(Vec<Card>),
}

impl DispatchPayload {
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Single(fragment) => classify(fragment).as_str(),
            Self::Carousel(_) => "carousel",
        }
    }
}

/// Merge maximal runs of consecutive cards into carousels, keeping every other
/// fragment in place. Unknown fragments are dropped but still end a run.
#[must_use]
pub fn aggregate(fragments: Vec<MessageFragment>) -> Vec<DispatchPayload> {
    let mut out = Vec::with_capacity(fragments.len());
    let mut run: Vec<Card> = Vec::new();

    for fragment in fragments {
        match fragment {
            MessageFragment::CardContent(card) => run.push(card),
            MessageFragment::Unknown { tag } => {
                close_run(&mut run, &mut out);
                warn!(tag = %tag, "dropping fragment of unknown kind");
            },
            other => {
                close_run(&mut run, &mut out);
                out.push(DispatchPayload::Single(other));
            },
        }
    }
    close_run(&mut run, &mut out);
    out
}

fn close_run(run: &mut Vec<Card>, out: &mut Vec<DispatchPayload>) {
    if !run.is_empty() {
        out.push(DispatchPayload::Carousel(std::mem::take(run)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> MessageFragment {
        MessageFragment::PlainText { text: s.into() }
    }

    fn card(title: &str) -> Card {
        Card {
            title: title.into(),
            ..Default::default()
        }
    }

    fn card_fragment(title: &str) -> MessageFragment {
        MessageFragment::CardContent(card(title))
    }

    #[test]
    fn consecutive_cards_merge_between_text() {
        let out = aggregate(vec![
            text("a"),
            card_fragment("X"),
            card_fragment("Y"),
            text("b"),
        ]);
        assert_eq!(out, vec![
            DispatchPayload::Single(text("a")),
            DispatchPayload::Carousel(vec![card("X"), card("Y")]),
            DispatchPayload::Single(text("b")),
        ]);
    }

    #[test]
    fn lone_card_is_a_one_element_carousel() {
        assert_eq!(aggregate(vec![card_fragment("X")]), vec![
            DispatchPayload::Carousel(vec![card("X")])
        ]);
    }

    #[test]
    fn trailing_run_is_closed() {
        let out = aggregate(vec![text("a"), card_fragment("X"), card_fragment("Y")]);
        assert_eq!(out.len(), 2);
        assert_eq!(out[1], DispatchPayload::Carousel(vec![card("X"), card("Y")]));
    }

    #[test]
    fn interrupted_runs_stay_separate() {
        let out = aggregate(vec![
            card_fragment("X"),
            text("between"),
            card_fragment("Y"),
            card_fragment("Z"),
        ]);
        assert_eq!(out, vec![
            DispatchPayload::Carousel(vec![card("X")]),
            DispatchPayload::Single(text("between")),
            DispatchPayload::Carousel(vec![card("Y"), card("Z")]),
        ]);
    }

    #[test]
    fn unknown_fragment_is_dropped_and_splits_run() {
        let out = aggregate(vec![
            card_fragment("X"),
            MessageFragment::Unknown { tag: "9".into() },
            card_fragment("Y"),
        ]);
        assert_eq!(out, vec![
            DispatchPayload::Carousel(vec![card("X")]),
            DispatchPayload::Carousel(vec![card("Y")]),
        ]);
    }

    #[test]
    fn empty_input_yields_nothing() {
        assert!(aggregate(Vec::new()).is_empty());
    }

    #[test]
    fn carousels_reconstruct_card_runs() {
        let input = vec![
            card_fragment("1"),
            card_fragment("2"),
            text("t"),
            MessageFragment::Image {
                url: "https://x/i.png".into(),
            },
            card_fragment("3"),
            text("u"),
            card_fragment("4"),
            card_fragment("5"),
            card_fragment("6"),
        ];
        let out = aggregate(input.clone());
        assert!(out.len() <= input.len());

        let mut expected_runs: Vec<Vec<Card>> = Vec::new();
        let mut current = Vec::new();
        for fragment in &input {
            if let MessageFragment::CardContent(c) = fragment {
                current.push(c.clone());
            } else if !current.is_empty() {
                expected_runs.push(std::mem::take(&mut current));
            }
        }
        if !current.is_empty() {
            expected_runs.push(current);
        }

        let runs: Vec<Vec<Card>> = out
            .into_iter()
            .filter_map(|p| match p {
                DispatchPayload::Carousel(cards) => Some(cards),
                DispatchPayload::Single(_) => None,
            })
            .collect();
        assert_eq!(runs, expected_runs);
    }
}
