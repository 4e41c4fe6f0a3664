pub mod d402_order_sales;
