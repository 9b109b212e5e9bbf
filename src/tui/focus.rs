//! Section cycling and focus order inside the Providers section.
//!
//! The provider field order is recomputed from enablement state on every
//! move and never stored.

use crate::providers::ApiProvider;

use super::models::{LoggingField, ProviderField, ProvidersState, RenameBehaviorField, Section};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Next,
    Prev,
}

fn step(len: usize, index: usize, direction: Direction) -> usize {
    match direction {
        Direction::Next => (index + 1) % len,
        Direction::Prev => (index + len - 1) % len,
    }
}

impl Section {
    pub fn advance(self, direction: Direction) -> Section {
        let index = Section::ALL.iter().position(|s| *s == self).unwrap_or(0);
        Section::ALL[step(Section::ALL.len(), index, direction)]
    }
}

/// Reachable fields, in traversal order.
pub fn provider_field_order(state: &ProvidersState) -> Vec<ProviderField> {
    let mut order = vec![ProviderField::WorkerCount, ProviderField::FFProbeToggle];

    for provider in ApiProvider::ALL {
        order.push(ProviderField::Toggle(provider));
        let service = state.service(provider);
        if service.enabled {
            order.push(ProviderField::ApiKey(provider));
            if service.language.is_some() {
                order.push(ProviderField::Language(provider));
            }
        }
    }

    order
}

/// `field` if it is reachable, otherwise its provider's toggle.
pub fn reachable_focus(state: &ProvidersState, field: ProviderField) -> ProviderField {
    if provider_field_order(state).contains(&field) {
        return field;
    }
    match field.provider() {
        Some(provider) => ProviderField::Toggle(provider),
        None => ProviderField::WorkerCount,
    }
}

pub fn move_provider_focus(state: &ProvidersState, direction: Direction) -> ProviderField {
    let order = provider_field_order(state);
    let current = reachable_focus(state, state.focus);
    let index = order.iter().position(|f| *f == current).unwrap_or(0);
    order[step(order.len(), index, direction)]
}

impl LoggingField {
    pub fn advance(self, direction: Direction) -> LoggingField {
        const ORDER: [LoggingField; 2] = [LoggingField::Enabled, LoggingField::RetentionDays];
        let index = ORDER.iter().position(|f| *f == self).unwrap_or(0);
        ORDER[step(ORDER.len(), index, direction)]
    }
}

impl RenameBehaviorField {
    pub fn advance(self, direction: Direction) -> RenameBehaviorField {
        const ORDER: [RenameBehaviorField; 2] = [RenameBehaviorField::IncludeSubtitles, RenameBehaviorField::DryRun];
        let index = ORDER.iter().position(|f| *f == self).unwrap_or(0);
        ORDER[step(ORDER.len(), index, direction)]
    }
}
