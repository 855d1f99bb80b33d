mod conversion;

pub use conversion::convert_with_price;
pub use conversion::round_token_display;
pub use conversion::Conversion;
pub use conversion::PriceConversionEngine;
pub use conversion::Unit;
pub use conversion::{LP_MATCH_DECIMALS, SOL_DECIMALS, TOKEN_DISPLAY_DECIMALS, USD_DECIMALS};
