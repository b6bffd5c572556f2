pub mod enedis;
pub mod file;
pub mod influx;
pub mod meter_source;
