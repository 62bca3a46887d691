pub mod version_util;
