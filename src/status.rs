use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Business status of an order. Orders are created into `New` by the
/// cart conversion and only move along the edges in
/// [`OrderStatus::allowed_transitions`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    New,
    Confirmed,
    Assembled,
    Sent,
    Delivered,
    Canceled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 6] = [
        OrderStatus::New,
        OrderStatus::Confirmed,
        OrderStatus::Assembled,
        OrderStatus::Sent,
        OrderStatus::Delivered,
        OrderStatus::Canceled,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::New => "new",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Assembled => "assembled",
            OrderStatus::Sent => "sent",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Canceled => "canceled",
        }
    }

    pub fn parse(value: &str) -> Option<OrderStatus> {
        match value {
            "new" => Some(OrderStatus::New),
            "confirmed" => Some(OrderStatus::Confirmed),
            "assembled" => Some(OrderStatus::Assembled),
            "sent" => Some(OrderStatus::Sent),
            "delivered" => Some(OrderStatus::Delivered),
            "canceled" => Some(OrderStatus::Canceled),
            _ => None,
        }
    }

    /// The complete edge set of the status machine. Any pair not listed
    /// here is a forbidden transition, including re-requesting the
    /// current status.
    pub fn allowed_transitions(self) -> &'static [OrderStatus] {
        match self {
            OrderStatus::New => &[OrderStatus::Confirmed, OrderStatus::Canceled],
            OrderStatus::Confirmed => &[OrderStatus::Assembled, OrderStatus::Canceled],
            OrderStatus::Assembled => &[OrderStatus::Sent, OrderStatus::Canceled],
            OrderStatus::Sent => &[OrderStatus::Delivered],
            OrderStatus::Delivered | OrderStatus::Canceled => &[],
        }
    }

    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        self.allowed_transitions().contains(&next)
    }

    pub fn is_terminal(self) -> bool {
        self.allowed_transitions().is_empty()
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::OrderStatus::{self, *};

    #[test]
    fn table_is_exactly_the_allowed_edges() {
        let edges = [
            (New, Confirmed),
            (New, Canceled),
            (Confirmed, Assembled),
            (Confirmed, Canceled),
            (Assembled, Sent),
            (Assembled, Canceled),
            (Sent, Delivered),
        ];
        for from in OrderStatus::ALL {
            for to in OrderStatus::ALL {
                let allowed = edges.contains(&(from, to));
                assert_eq!(
                    from.can_transition_to(to),
                    allowed,
                    "{from} -> {to} should be {}",
                    if allowed { "allowed" } else { "forbidden" }
                );
            }
        }
    }

    #[test]
    fn same_status_is_never_allowed() {
        for status in OrderStatus::ALL {
            assert!(!status.can_transition_to(status));
        }
    }

    #[test]
    fn delivered_and_canceled_are_absorbing() {
        assert!(Delivered.is_terminal());
        assert!(Canceled.is_terminal());
        for to in OrderStatus::ALL {
            assert!(!Delivered.can_transition_to(to));
            assert!(!Canceled.can_transition_to(to));
        }
    }

    #[test]
    fn parse_round_trips_known_statuses() {
        for status in OrderStatus::ALL {
            assert_eq!(OrderStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(OrderStatus::parse("basket"), None);
        assert_eq!(OrderStatus::parse("PENDING"), None);
        assert_eq!(OrderStatus::parse(""), None);
    }
}
