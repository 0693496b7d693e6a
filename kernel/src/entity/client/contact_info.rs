use std::collections::BTreeSet;

use destructure::Destructure;
use vodca::References;

#[derive(Debug, Clone, Hash, Eq, PartialEq, Default, References, Destructure)]
pub struct ContactInfo {
    main_phone: Option<String>,
    main_email: Option<String>,
    all_phones: BTreeSet<String>,
    all_emails: BTreeSet<String>,
}

impl ContactInfo {
    pub fn new(
        main_phone: Option<String>,
        main_email: Option<String>,
        all_phones: BTreeSet<String>,
        all_emails: BTreeSet<String>,
    ) -> Self {
        Self {
            main_phone,
            main_email,
            all_phones,
            all_emails,
        }
    }
}
