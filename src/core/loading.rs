use super::source::SourceId;
use serde::Serialize;

/// Read-only view of which sources have a fetch in flight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoadingStates {
    pub weather: bool,
    pub exchange: bool,
    pub events: bool,
}

impl LoadingStates {
    pub fn is_loading(&self, id: SourceId) -> bool {
        match id {
            SourceId::Weather => self.weather,
            SourceId::ExchangeRate => self.exchange,
            SourceId::EventFeed => self.events,
        }
    }

    pub fn any_loading(&self) -> bool {
        self.weather || self.exchange || self.events
    }

    pub fn all_settled(&self) -> bool {
        !self.any_loading()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_readiness() {
        let states = LoadingStates {
            weather: false,
            exchange: true,
            events: false,
        };
        assert!(!states.is_loading(SourceId::Weather));
        assert!(states.is_loading(SourceId::ExchangeRate));
        assert!(states.any_loading());
        assert!(!states.all_settled());
        assert!(LoadingStates::default().all_settled());
    }
}
