pub(crate) mod check_pegin;
pub(crate) mod pegin_address;
pub(crate) mod pegout;
