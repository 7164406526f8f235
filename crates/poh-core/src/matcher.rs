//! Reply derivation for normalized mention text.
//!
//! [`ResponseMatcher`] walks a fixed, ordered rule table and returns the reply
//! of the first rule that applies:
//!
//! 1. exact literals
//! 2. the parity rule for `君の名は` (reply depends on the current second)
//! 3. the `買う` ("to buy") suffix
//! 4. the `た` / `だ` suffixes
//!
//! and [`DEFAULT_REPLY`] when none does. Suffix lengths are counted in code
//! points.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::clock::{Clock, SystemClock};
use crate::normalizer::NormalizedMessage;

/// Reply used when no rule applies.
pub const DEFAULT_REPLY: &str = "ぽぽっぽ〜";

/// A single reply rule.
#[derive(Debug, Clone, Copy)]
enum Rule {
    /// The whole message equals one of `inputs`.
    Exact {
        inputs: &'static [&'static str],
        reply: &'static str,
    },

    /// The message equals `input`; the reply alternates with the parity of
    /// the current Unix second.
    ByParity {
        input: &'static str,
        even: &'static str,
        odd: &'static str,
    },

    /// The message is longer than `longer_than` code points and ends with
    /// `suffix`; the reply is the remaining prefix followed by `append`.
    Suffix {
        suffix: &'static str,
        longer_than: usize,
        append: &'static str,
    },
}

const RULES: &[Rule] = &[
    Rule::Exact {
        inputs: &["ping"],
        reply: "ぽん",
    },
    Rule::Exact {
        inputs: &["hi", "hello", "hey", "やっほー"],
        reply: "やっほ〜",
    },
    Rule::Exact {
        inputs: &["かわいい", "かっこいい"],
        reply: "うぴゃぁ :poh:",
    },
    Rule::Exact {
        inputs: &["しろくろまっちゃ"],
        reply: "あがりコーヒーゆずさくら",
    },
    Rule::Exact {
        inputs: &["天気"],
        reply: "わかったらいいのにね",
    },
    Rule::Exact {
        inputs: &["買い物リスト"],
        reply: "忘れちゃった！",
    },
    Rule::ByParity {
        input: "君の名は",
        even: "ぽー だよ",
        odd: "ぷー だよ\n:pooh: :poh: 「「入れ替わってるーー！？！？」」",
    },
    Rule::Suffix {
        suffix: "買う",
        longer_than: 3,
        append: "が買いたいんだね〜覚えとくね！",
    },
    Rule::Suffix {
        suffix: "た",
        longer_than: 1,
        append: "てえらい〜！",
    },
    Rule::Suffix {
        suffix: "だ",
        longer_than: 1,
        append: "でえらい〜！",
    },
];

impl Rule {
    fn apply(&self, msg: &NormalizedMessage, clock: &dyn Clock) -> Option<String> {
        let text = msg.as_str();
        match *self {
            Rule::Exact { inputs, reply } => inputs.contains(&text).then(|| reply.to_string()),
            Rule::ByParity { input, even, odd } => (text == input).then(|| {
                if clock.unix_seconds() % 2 == 0 {
                    even.to_string()
                } else {
                    odd.to_string()
                }
            }),
            Rule::Suffix {
                suffix,
                longer_than,
                append,
            } => {
                if msg.char_count() <= longer_than {
                    return None;
                }
                text.strip_suffix(suffix)
                    .map(|prefix| format!("{prefix}{append}"))
            }
        }
    }
}

/// Maps normalized mention text to a reply.
///
/// The clock is injected so the `君の名は` parity rule can be pinned in
/// tests; everything else is a pure function of the input.
///
/// # Examples
///
/// ```
/// use poh_core::{normalize, FixedClock, ResponseMatcher};
///
/// let matcher = ResponseMatcher::new(FixedClock(0));
/// let msg = normalize("<@U1> pingした").unwrap();
/// assert_eq!(matcher.reply(&msg), "pingしてえらい〜！");
/// ```
#[derive(Clone)]
pub struct ResponseMatcher {
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for ResponseMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseMatcher")
            .field("rules", &RULES.len())
            .finish()
    }
}

impl Default for ResponseMatcher {
    fn default() -> Self {
        Self::new(SystemClock)
    }
}

impl ResponseMatcher {
    /// Creates a matcher reading time from `clock`.
    pub fn new(clock: impl Clock + 'static) -> Self {
        Self {
            clock: Arc::new(clock),
        }
    }

    /// Returns the reply for `msg`. Never empty.
    pub fn reply(&self, msg: &NormalizedMessage) -> String {
        for (index, rule) in RULES.iter().enumerate() {
            if let Some(reply) = rule.apply(msg, self.clock.as_ref()) {
                debug!(rule = index, "Reply rule matched");
                return reply;
            }
        }
        DEFAULT_REPLY.to_string()
    }
}
