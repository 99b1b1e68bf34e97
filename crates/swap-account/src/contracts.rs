//! Solidity bindings for the token contracts the core touches.

use alloy::sol;

sol! {
	#[sol(rpc)]
	interface IERC20 {
		function balanceOf(address owner) external view returns (uint256);
		function allowance(address owner, address spender) external view returns (uint256);
		function approve(address spender, uint256 amount) external returns (bool);
	}

	/// Wrapped native currency.
	#[sol(rpc)]
	interface IWETH {
		function deposit() external payable;
		function withdraw(uint256 wad) external;
	}
}
