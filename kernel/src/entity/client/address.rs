/// Postal address of a client. Every part is optional since onboarding forms
/// rarely collect all of them.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Default)]
pub struct Address {
    pub street: Option<String>,
    pub number: Option<String>,
    pub zip_code: Option<String>,
    pub district: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub complement: Option<String>,
    pub note: Option<String>,
}

impl Address {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
