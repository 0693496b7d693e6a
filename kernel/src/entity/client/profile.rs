use destructure::Destructure;
use time::Date;
use vodca::References;

#[derive(Debug, Clone, Hash, Eq, PartialEq, References, Destructure)]
pub struct Profile {
    name: String,
    sex: Option<String>,
    birthday: Option<Date>,
}

impl Profile {
    pub fn new(name: impl Into<String>, sex: Option<String>, birthday: Option<Date>) -> Self {
        Self {
            name: name.into(),
            sex,
            birthday,
        }
    }
}
