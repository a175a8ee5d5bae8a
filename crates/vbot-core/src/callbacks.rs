use crate::domain::VacancyId;

/// Closed set of inline-button tokens.
///
/// Wire form is `"<action>_<id>"` with the id parsed from the remainder after
/// the first underscore; the two navigation tokens carry no id. Anything else
/// parses to `None` and is ignored by the router.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CallbackAction {
    VacancyDetails(VacancyId),
    Apply(VacancyId),
    EditVacancy(VacancyId),
    DeleteVacancy(VacancyId),
    ViewCandidates(VacancyId),
    BackToMenu,
    BackToCatalog,
}

impl CallbackAction {
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "navigate-back-to-menu" => return Some(Self::BackToMenu),
            "navigate-back-to-catalog" => return Some(Self::BackToCatalog),
            _ => {}
        }

        let (action, rest) = token.split_once('_')?;
        let id = VacancyId(rest.parse().ok()?);
        match action {
            "select-vacancy-for-details" => Some(Self::VacancyDetails(id)),
            "select-vacancy-to-apply" => Some(Self::Apply(id)),
            "select-vacancy-to-edit" => Some(Self::EditVacancy(id)),
            "select-vacancy-to-delete" => Some(Self::DeleteVacancy(id)),
            "select-vacancy-for-candidates" => Some(Self::ViewCandidates(id)),
            _ => None,
        }
    }

    pub fn token(&self) -> String {
        match self {
            Self::VacancyDetails(id) => format!("select-vacancy-for-details_{}", id.0),
            Self::Apply(id) => format!("select-vacancy-to-apply_{}", id.0),
            Self::EditVacancy(id) => format!("select-vacancy-to-edit_{}", id.0),
            Self::DeleteVacancy(id) => format!("select-vacancy-to-delete_{}", id.0),
            Self::ViewCandidates(id) => format!("select-vacancy-for-candidates_{}", id.0),
            Self::BackToMenu => "navigate-back-to-menu".to_string(),
            Self::BackToCatalog => "navigate-back-to-catalog".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_every_variant() {
        let id = VacancyId(42);
        for action in [
            CallbackAction::VacancyDetails(id),
            CallbackAction::Apply(id),
            CallbackAction::EditVacancy(id),
            CallbackAction::DeleteVacancy(id),
            CallbackAction::ViewCandidates(id),
            CallbackAction::BackToMenu,
            CallbackAction::BackToCatalog,
        ] {
            assert_eq!(CallbackAction::parse(&action.token()), Some(action));
        }
    }

    #[test]
    fn rejects_unknown_and_malformed_tokens() {
        assert_eq!(CallbackAction::parse("select-vacancy-to-apply_"), None);
        assert_eq!(CallbackAction::parse("select-vacancy-to-apply_x9"), None);
        assert_eq!(CallbackAction::parse("askuser:1:2"), None);
        assert_eq!(CallbackAction::parse("vacancy_3"), None);
        assert_eq!(CallbackAction::parse(""), None);
    }
}
