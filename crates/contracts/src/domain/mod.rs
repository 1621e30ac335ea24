pub mod a001_cabinet;
