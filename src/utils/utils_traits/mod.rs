use serde::de::DeserializeOwned;
use serde::{Serialize};
use crate::utils::utils_errors::BlocksimError;

pub trait ToAndFromRonString: Serialize + DeserializeOwned {
    fn convert_to_ron_string(&self) -> Result<String, BlocksimError> {
        ron::to_string(self).map_err(|e| BlocksimError::new_parse_error("ron", &e.to_string(), file!(), line!()))
    }
    fn load_from_ron_string(ron_string: &str) -> Result<Self, BlocksimError> where Self: Sized {
        let load: Result<Self, _> = ron::from_str(ron_string);
        return match load {
            Ok(load) => { Ok(load) }
            Err(e) => { Err(BlocksimError::new_parse_error("ron", &format!("Could not load ron string {:?} into correct type ({}).", ron_string, e), file!(), line!())) }
        }
    }
}
impl <T> ToAndFromRonString for T where T: Serialize + DeserializeOwned {  }

pub trait ToAndFromJsonString: Serialize + DeserializeOwned {
    fn convert_to_json_string(&self) -> Result<String, BlocksimError> {
        serde_json::to_string(self).map_err(|e| BlocksimError::new_parse_error("json", &e.to_string(), file!(), line!()))
    }
    fn load_from_json_string(json_str: &str) -> Result<Self, BlocksimError> where Self: Sized {
        serde_json::from_str(json_str).map_err(|e| BlocksimError::new_parse_error("json", &e.to_string(), file!(), line!()))
    }
}
impl <T> ToAndFromJsonString for T where T: Serialize + DeserializeOwned {  }

pub trait ToAndFromTomlString: Serialize + DeserializeOwned {
    fn convert_to_toml_string(&self) -> Result<String, BlocksimError> {
        toml::to_string(self).map_err(|e| BlocksimError::new_parse_error("toml", &e.to_string(), file!(), line!()))
    }
    fn load_from_toml_string(toml_str: &str) -> Result<Self, BlocksimError> where Self: Sized {
        toml::from_str(toml_str).map_err(|e| BlocksimError::new_parse_error("toml", &e.to_string(), file!(), line!()))
    }
}
impl <T> ToAndFromTomlString for T where T: Serialize + DeserializeOwned {  }
