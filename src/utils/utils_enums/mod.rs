use strum::IntoEnumIterator;
use crate::utils::utils_errors::BlocksimError;
use crate::utils::utils_traits::ToAndFromRonString;

pub struct EnumUtils;
impl EnumUtils {
    pub fn get_all_variants_of_enum<T: IntoEnumIterator>() -> Vec<T> {
        let out: Vec<T> = T::iter().collect();
        out
    }
    pub fn convert_all_variants_of_enum_into_ron_strings<T: IntoEnumIterator + ToAndFromRonString>() -> Result<Vec<String>, BlocksimError> {
        let mut out = vec![];

        let variants = Self::get_all_variants_of_enum::<T>();
        for v in &variants { out.push(v.convert_to_ron_string()?); }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environments::controllers::{ActionKind, GraspPhase};

    #[test]
    fn lists_variants_in_declaration_order() {
        assert_eq!(EnumUtils::get_all_variants_of_enum::<ActionKind>(), vec![ActionKind::Pickup, ActionKind::PutOn, ActionKind::PutOnTable]);
        assert_eq!(EnumUtils::get_all_variants_of_enum::<GraspPhase>().len(), 6);
        assert_eq!(EnumUtils::convert_all_variants_of_enum_into_ron_strings::<ActionKind>().unwrap(), vec!["Pickup", "PutOn", "PutOnTable"]);
    }
}
